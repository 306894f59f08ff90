pub mod hashing;
pub use hashing::HashMap;
pub use hashing::HashSet;

pub mod name_table;
pub use name_table::NameEntryRef;
pub use name_table::NameTable;

mod name;
pub use name::Name;

pub mod hashed_name;
pub use hashed_name::CollisionPolicy;
pub use hashed_name::CollisionSafe;
pub use hashed_name::CollisionUnsafe;
pub use hashed_name::HashedName;
pub use hashed_name::InlineName;
pub use hashed_name::SafeName;
pub use hashed_name::UnsafeName;
