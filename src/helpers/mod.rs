pub mod guard_helper;
pub mod template_helper;
