mod export_tests;
mod session_tests;
mod widget_tests;
