pub mod session;
pub mod task;
pub mod user;

#[cfg(test)]
mod test_util;
