//! Socket ownership: the raw ICMP reply watcher and the UDP request
//! dispatcher (§4.3, §4.4).

pub mod dispatcher;
pub mod platform;
pub mod reply_watcher;

pub use dispatcher::RequestDispatcher;
pub use reply_watcher::ReplyWatcher;
