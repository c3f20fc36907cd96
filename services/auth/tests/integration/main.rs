mod helpers;
mod session_test;
mod state_test;
