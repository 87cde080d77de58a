pub mod numeric;
pub mod time;
