/// Runs a blocking operation (database query, file read or write) from a UI
/// handler.
pub fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
