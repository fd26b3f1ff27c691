mod account;
mod blob;
mod multipart;
