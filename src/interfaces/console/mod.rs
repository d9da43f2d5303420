pub mod session_writer;
