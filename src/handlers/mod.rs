pub mod api;
pub mod redirect;

#[cfg(test)]
mod tests;
