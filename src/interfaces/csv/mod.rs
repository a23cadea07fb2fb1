pub mod payment_method_reader;

pub use payment_method_reader::PaymentMethodReader;
