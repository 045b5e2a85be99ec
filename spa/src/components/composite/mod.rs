pub mod kpi_card;
pub mod login_form;
pub mod navigation_bar;
pub mod threats_table;
