//! The shipped node catalog.
//!
//! One representative node per structural family: passthrough output,
//! JSON transform, long-running generation, database query and
//! connected-account messaging. Each is an independent value-like struct
//! implementing [`NodeContract`](crate::node::NodeContract).

mod chat_post;
mod db_query;
mod image_generate;
mod json_to_array;
mod output_text;

pub use chat_post::ChatPostNode;
pub use db_query::DbQueryNode;
pub use image_generate::ImageGenerateNode;
pub use json_to_array::JsonToArrayNode;
pub use output_text::OutputTextNode;
