pub mod local_file_store;
pub mod observation_pg_repo;
pub mod sla_config_pg_repo;
