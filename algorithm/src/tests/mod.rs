mod test_coordinates;
mod test_parse;
