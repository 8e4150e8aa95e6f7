mod slug;

pub use slug::repo_slug;
