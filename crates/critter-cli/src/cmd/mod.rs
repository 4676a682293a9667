pub mod config;
pub mod list;
pub mod review;

/// Single-threaded runtime; every stage issues one request at a time.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Into::into)
}
