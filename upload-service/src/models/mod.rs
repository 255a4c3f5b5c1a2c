pub mod uploaded_file;

pub use uploaded_file::{sanitize_file_name, stored_file_name, UploadedFile};
