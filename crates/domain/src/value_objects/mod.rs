pub mod message_form;
pub mod send_request;

pub use message_form::MessageForm;
pub use send_request::SendRequest;
