pub mod accounts;
pub mod comments;
pub mod password;
pub mod posts;
pub mod search;
pub mod votes;

pub use accounts::AccountService;
pub use comments::{CommentService, CreatedComment, MAX_COMMENT_DEPTH};
pub use posts::PostService;
pub use search::SearchService;
pub use votes::VoteLedger;
