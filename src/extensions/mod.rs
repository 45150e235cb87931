pub mod date_time_ext;
pub mod unsigned_ints_ext;
