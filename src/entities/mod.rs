pub mod prelude;

pub mod uploaded_files;
