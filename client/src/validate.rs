/// Client-side validation of request bodies, run before any I/O.
pub trait Validate {
    /// `Err` carries a human readable reason.
    fn validate(&self) -> Result<(), String>;
}
