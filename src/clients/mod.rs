pub mod library_client;
