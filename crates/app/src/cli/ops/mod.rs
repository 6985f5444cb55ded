pub mod init;
pub mod list;
pub mod roots;
pub mod version;

pub use init::Init;
pub use list::List;
pub use roots::Roots;
pub use version::Version;
