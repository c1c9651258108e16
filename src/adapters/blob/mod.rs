//! Azure Blob Storage integration

pub mod client;

pub use client::{
    content_type_for, BlobStorageClient, BlobUploader, UploadReceipt, STORAGE_API_VERSION,
};
