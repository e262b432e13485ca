/// Client-side session state fed by server messages.

pub mod event;
pub mod session;
