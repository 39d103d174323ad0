#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:4000");
        assert_eq!(config.auth.token_ttl_hours, 8);
        assert_eq!(config.auth.issuer, "loomerp");
        assert!(config.database.initialize_schema);
        assert!(config.server.static_dir.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [server]
            bind = "0.0.0.0:8080"
            cors_origins = ["http://localhost:5173"]

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"

            [auth.bootstrap_admin]
            username = "admin"
            password = "change-me-now"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(config.database.max_connections, 10);
        let admin = config.auth.bootstrap_admin.as_ref().unwrap();
        assert_eq!(admin.email, "admin@loomerp.local");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "mysql://u:p@db:3306/erp"),
            ("LOOMERP_JWT_SECRET", SECRET),
            ("LOOMERP_STATIC_DIR", "./frontend/dist"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.url, "mysql://u:p@db:3306/erp");
        assert_eq!(config.auth.jwt_secret, SECRET);
        assert_eq!(config.server.static_dir.as_deref(), Some("./frontend/dist"));
    }

    #[test]
    fn test_prefixed_database_url_wins() {
        let mut config = Config::default();
        config.apply_env(|k| match k {
            "LOOMERP_DATABASE_URL" => Some("mysql://a".to_string()),
            "DATABASE_URL" => Some("mysql://b".to_string()),
            _ => None,
        });
        assert_eq!(config.database.url, "mysql://a");
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::default();
        config.auth.jwt_secret = "short".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_pool_bounds_validated() {
        let mut config = Config::default();
        config.auth.jwt_secret = SECRET.into();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = Config::default();
        config.auth.jwt_secret = SECRET.into();
        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(config.validate().is_ok());

        for ttl in [0, MAX_TOKEN_TTL_HOURS + 1, i64::MAX / 2] {
            config.auth.token_ttl_hours = ttl;
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "ttl {}", ttl);
        }
    }
}
