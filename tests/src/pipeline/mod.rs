mod compile_test;
mod internal_test;
mod module_test;
