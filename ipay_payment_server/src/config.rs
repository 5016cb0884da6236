use std::env;

use ipay_payment_engine::{
    ipay::{ChannelFlags, IpayConfig, OverpaymentPolicy, DEFAULT_TRANSACTION_ENDPOINT, SANDBOX_TRANSACTION_ENDPOINT},
    ReconciliationConfig,
};
use ipg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const DEFAULT_IPG_HOST: &str = "127.0.0.1";
const DEFAULT_IPG_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Skip callback signature verification. Only honoured in sandbox mode and only as an
    /// explicit opt-in; never inferred from a missing secret. **DANGER**
    pub skip_signature_check: bool,
    pub ipay: IpayConfig,
    pub overpayment_policy: OverpaymentPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_IPG_HOST.to_string(),
            port: DEFAULT_IPG_PORT,
            database_url: String::default(),
            skip_signature_check: false,
            ipay: IpayConfig::default(),
            overpayment_policy: OverpaymentPolicy::Reject,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("IPG_HOST").ok().unwrap_or_else(|| DEFAULT_IPG_HOST.into());
        let port = env::var("IPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for IPG_PORT. {e} Using the default, {DEFAULT_IPG_PORT}, instead."
                    );
                    DEFAULT_IPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_IPG_PORT);
        let database_url = env::var("IPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ IPG_DATABASE_URL is not set. Please set it to the URL for the payments database.");
            String::default()
        });
        let ipay = ipay_config_from_env();
        let skip_requested = parse_boolean_flag(env::var("IPG_SANDBOX_SKIP_SIGNATURE").ok(), false);
        let skip_signature_check = if skip_requested && ipay.live_mode {
            error!(
                "🚨️ IPG_SANDBOX_SKIP_SIGNATURE is set, but the server is in live mode. Signature checks stay enabled."
            );
            false
        } else {
            if skip_requested {
                warn!("🚨️ Callback signature verification is DISABLED (sandbox only). Never do this in live mode.");
            }
            skip_requested
        };
        let overpayment_policy = overpayment_policy_from_env();
        Self { host, port, database_url, skip_signature_check, ipay, overpayment_policy }
    }

    pub fn reconciliation_config(&self) -> ReconciliationConfig {
        ReconciliationConfig { ipay: self.ipay.clone(), overpayment_policy: self.overpayment_policy }
    }
}

fn ipay_config_from_env() -> IpayConfig {
    let vendor_id = env::var("IPG_VENDOR_ID").ok().unwrap_or_else(|| {
        error!("🪛️ IPG_VENDOR_ID is not set. Please set it to your iPay vendor id.");
        String::default()
    });
    let hash_key = env::var("IPG_HASH_KEY").ok().unwrap_or_else(|| {
        error!("🪛️ IPG_HASH_KEY is not set. Callback verification and request signing will fail closed.");
        String::default()
    });
    let live_mode = parse_boolean_flag(env::var("IPG_LIVE_MODE").ok(), false);
    let mut config = IpayConfig {
        vendor_id,
        hash_key: Secret::from(hash_key),
        live_mode,
        ..IpayConfig::default()
    };
    if let Ok(currency) = env::var("IPG_CURRENCY") {
        config.currency = currency;
    }
    config.callback_url = env::var("IPG_CALLBACK_URL").ok().unwrap_or_else(|| {
        error!("🪛️ IPG_CALLBACK_URL is not set. The gateway will have nowhere to post callbacks.");
        String::default()
    });
    config.return_url = env::var("IPG_RETURN_URL").ok().unwrap_or_default();
    if let Ok(endpoint) = env::var("IPG_PAYMENT_ENDPOINT") {
        config.payment_endpoint = endpoint;
    }
    config.transaction_endpoint = env::var("IPG_TRANSACTION_ENDPOINT").ok().unwrap_or_else(|| {
        if live_mode { DEFAULT_TRANSACTION_ENDPOINT.to_string() } else { SANDBOX_TRANSACTION_ENDPOINT.to_string() }
    });
    config.channels = channel_flags_from_env();
    config
}

/// Read the overpayment policy from `IPG_OVERPAYMENT_POLICY` (`accept` or `reject`). An unset or
/// unrecognized value falls back to rejecting overpayments, since that path requires no manual
/// refund handling to be in place.
fn overpayment_policy_from_env() -> OverpaymentPolicy {
    match env::var("IPG_OVERPAYMENT_POLICY").map(|s| s.to_lowercase()) {
        Ok(s) if s == "accept" => OverpaymentPolicy::AcceptAndFlag,
        Ok(s) if s == "reject" => OverpaymentPolicy::Reject,
        Ok(s) => {
            error!("🪛️ '{s}' is not a valid IPG_OVERPAYMENT_POLICY (accept|reject). Overpayments will be rejected.");
            OverpaymentPolicy::Reject
        },
        Err(_) => {
            warn!("🪛️ IPG_OVERPAYMENT_POLICY is not set. Overpayments will be rejected.");
            OverpaymentPolicy::Reject
        },
    }
}

fn channel_flags_from_env() -> ChannelFlags {
    let flag =
        |name: &str, default: bool| parse_boolean_flag(env::var(format!("IPG_CHANNEL_{name}")).ok(), default);
    ChannelFlags {
        mpesa: flag("MPESA", true),
        bonga: flag("BONGA", true),
        airtel: flag("AIRTEL", true),
        equity: flag("EQUITY", true),
        mobilebanking: flag("MOBILEBANKING", true),
        creditcard: flag("CREDITCARD", true),
        unionpay: flag("UNIONPAY", true),
        mvisa: flag("MVISA", true),
        vooma: flag("VOOMA", true),
        pesalink: flag("PESALINK", true),
        autopay: flag("AUTOPAY", true),
    }
}
