pub mod catalog_service;
pub mod form_session;
pub mod normalizer; // 测试控制台JSON整形
pub mod template_service;
pub mod token_client;
pub mod validation_service;
