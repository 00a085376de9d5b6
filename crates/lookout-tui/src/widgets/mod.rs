pub mod form;
pub mod person_detail;
pub mod person_list;
