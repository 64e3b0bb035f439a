pub mod json_audit_log;
