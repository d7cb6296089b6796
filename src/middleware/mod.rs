pub mod permission_guard;
