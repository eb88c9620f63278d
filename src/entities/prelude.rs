pub use super::uploaded_files::Entity as UploadedFiles;
