/// Aborts on a registry defect
///
/// Logs the error through `tracing` so it reaches whatever subscriber the embedding runtime
/// installed, then panics with the error message. Defects are programming errors, never a
/// recoverable condition.
///
/// ```rust, ignore
///  let service = match registry.try_get(&tag) {
///      Ok(service) => service,
///      Err(error) => defect!(error),
///  };
/// ```
macro_rules! defect {
    ($error:expr) => {{
        let error: crate::Error = $error;
        tracing::error!(%error, "capability registry defect");
        panic!("{}", error)
    }};
}
