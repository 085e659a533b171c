mod test_clock;
mod test_common_validation;
