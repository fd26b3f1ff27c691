mod list;
mod lro;
mod registrar;
