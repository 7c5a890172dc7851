mod common;

mod checker_tests;
mod link_order_tests;
mod pipeline_tests;
mod property_tests;
