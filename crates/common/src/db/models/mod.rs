//! SeaORM entity models
//!
//! Read-side view of the literature tables the snapshot loader consumes

mod author;
mod citation;
mod paper;
mod paper_author;

pub use paper::{
    Entity as PaperEntity,
    Model as PaperRow,
    Column as PaperColumn,
};

pub use citation::{
    Entity as CitationEntity,
    Model as CitationRow,
    Column as CitationColumn,
};

pub use author::{
    Entity as AuthorEntity,
    Model as AuthorRow,
    Column as AuthorColumn,
};

pub use paper_author::{
    Entity as PaperAuthorEntity,
    Model as PaperAuthorRow,
    Column as PaperAuthorColumn,
};
