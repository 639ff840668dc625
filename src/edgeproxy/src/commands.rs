use crate::Command;
use anyhow::{Context, Result};
use edgeproxy_config::ProxyConfig;
use edgeproxy_core::{
    install_tls_pair, AccessToken, AdminClient, CertUploadOutcome, CertificateLoader, Consumer,
    ConsumerManager, DefaultFileOpener, HttpCaller, ProvisioningService, Requestor, TokenLoader,
    TokenOptions, CERTIFICATES,
};
use edgeproxy_crypto::{sign_admin_jwt, AdminAlgorithm};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run(command: Command, cfg: &ProxyConfig) -> Result<()> {
    match command {
        Command::Init => init(cfg).await,
        Command::Reset => reset(cfg).await,
        Command::Adduser {
            user,
            token_ttl,
            jwt_audience,
            jwt_ttl,
            use_root_token,
        } => {
            let opts = token_options(jwt_audience, jwt_ttl, token_ttl);
            add_user(cfg, &user, &opts, use_root_token).await
        }
        Command::Deluser {
            user,
            use_root_token,
        } => del_user(cfg, &user, use_root_token).await,
        Command::Tls {
            in_cert,
            in_key,
            target_folder,
            cert_filename,
            key_filename,
        } => {
            let mut dest = cfg.tls_install(target_folder.as_deref());
            if let Some(name) = cert_filename {
                dest.cert_filename = name;
            }
            if let Some(name) = key_filename {
                dest.key_filename = name;
            }
            install_tls_pair(&DefaultFileOpener, &in_cert, &in_key, &dest)?;
            Ok(())
        }
        Command::Jwt {
            algorithm,
            private_key,
            id,
            expiration,
        } => {
            let alg: AdminAlgorithm = algorithm.parse()?;
            let pem = fs::read(&private_key)
                .with_context(|| format!("read private key {}", private_key.display()))?;
            let token = sign_admin_jwt(alg, &pem, &id, expiration)?;
            println!("{token}");
            Ok(())
        }
    }
}

/// `--jwtTTL` wins over the generic `--tokenTTL`.
fn token_options(
    audience: Option<String>,
    jwt_ttl: Option<Duration>,
    token_ttl: Option<Duration>,
) -> TokenOptions {
    TokenOptions {
        audience,
        ttl: jwt_ttl.or(token_ttl),
    }
}

fn admin_caller(cfg: &ProxyConfig) -> Result<Arc<dyn HttpCaller>> {
    Ok(Arc::new(Requestor::new(&cfg.admin_requestor()?)?))
}

async fn init(cfg: &ProxyConfig) -> Result<()> {
    let service = ProvisioningService::new(
        admin_caller(cfg)?,
        Arc::new(DefaultFileOpener),
        cfg.provisioning(),
    );
    service.check_proxy_status().await?;

    if cfg.secret_store.upload_on_init {
        let store: Arc<dyn HttpCaller> =
            Arc::new(Requestor::new(&cfg.secret_store_requestor()?)?);
        let loader = CertificateLoader::new(store, Arc::new(DefaultFileOpener), &cfg.secret_store);
        loader.check_status().await?;
        let pair = loader.load_validated().await?;
        let outcome = service.post_cert(pair, &cfg.secret_store.snis).await?;
        let endpoint = format!("{}/{CERTIFICATES}", cfg.kong.admin_base_url());
        accept_cert_outcome(outcome, &endpoint)?;
    }

    service.init().await?;
    Ok(())
}

/// A certificate already on the gateway is as good as a fresh upload.
fn accept_cert_outcome(outcome: CertUploadOutcome, endpoint: &str) -> Result<()> {
    match outcome.into_result(endpoint) {
        Ok(()) => info!("certificate uploaded"),
        Err(e) if e.is_conflict() => info!("certificate already present on the gateway"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn reset(cfg: &ProxyConfig) -> Result<()> {
    let service = ProvisioningService::new(
        admin_caller(cfg)?,
        Arc::new(DefaultFileOpener),
        cfg.provisioning(),
    );
    service.reset_proxy().await?;
    info!("reverse proxy reset");
    Ok(())
}

/// `--useRootToken` switches from the bootstrap bearer token to the root one.
fn admin_token_file(cfg: &ProxyConfig, use_root_token: bool) -> &str {
    if use_root_token {
        &cfg.root_token_file
    } else {
        &cfg.bearer_token_file
    }
}

fn consumer_manager(cfg: &ProxyConfig, use_root_token: bool) -> Result<ConsumerManager> {
    let token_file = admin_token_file(cfg, use_root_token);
    let token = TokenLoader::new(&DefaultFileOpener).load(Path::new(token_file))?;
    let admin = AdminClient::new(admin_caller(cfg)?, cfg.kong.admin_base_url(), token);
    Ok(ConsumerManager::new(admin, cfg.kong.clone(), cfg.auth.clone()))
}

async fn add_user(cfg: &ProxyConfig, user: &str, opts: &TokenOptions, use_root_token: bool) -> Result<()> {
    let manager = consumer_manager(cfg, use_root_token)?;
    let groups = vec![cfg.acl.group.clone()];
    let (consumer, token) = manager.add_user(user, &groups, opts).await?;
    println!("{}", serde_json::to_string_pretty(&user_output(&consumer, &token))?);
    Ok(())
}

fn user_output(consumer: &Consumer, token: &AccessToken) -> Value {
    json!({
        "username": consumer.name,
        "token": token.value,
        "token_type": token.token_type,
        "expires_in": token.expires_in,
    })
}

async fn del_user(cfg: &ProxyConfig, user: &str, use_root_token: bool) -> Result<()> {
    consumer_manager(cfg, use_root_token)?.delete(user).await?;
    info!(user, "consumer deleted");
    Ok(())
}
