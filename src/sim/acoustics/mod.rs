pub mod impulse_response;

pub use impulse_response::ImpulseResponse;
