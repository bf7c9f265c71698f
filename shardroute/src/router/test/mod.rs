pub mod test_insert;
