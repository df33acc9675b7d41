//! Backend commands queued from UI to backend worker.

pub enum BackendCommand {
    FetchProfile { endpoint: String },
    FetchAvatar { url: String },
}
