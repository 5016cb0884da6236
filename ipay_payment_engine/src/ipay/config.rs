use ipg_common::Secret;

pub const DEFAULT_PAYMENT_ENDPOINT: &str = "https://payments.ipayafrica.com/v3/ke";
pub const DEFAULT_TRANSACTION_ENDPOINT: &str = "https://www.ipayafrica.com/ipn/";
pub const SANDBOX_TRANSACTION_ENDPOINT: &str = "https://sandbox.ipayafrica.com/ipn/";

/// Merchant-side gateway configuration. Built once by the host application (the server reads it
/// from the environment) and passed in explicitly wherever it is needed; there is no global state.
#[derive(Clone, Debug)]
pub struct IpayConfig {
    /// The merchant's vendor id as registered with the gateway.
    pub vendor_id: String,
    /// The shared secret used for every signature in both directions.
    pub hash_key: Secret<String>,
    pub currency: String,
    /// When false, requests carry the gateway's sandbox flag (`live=0`).
    pub live_mode: bool,
    /// Where the gateway posts transaction outcome callbacks. Part of the signed field set.
    pub callback_url: String,
    /// Where the customer is redirected after completing payment on the hosted page.
    pub return_url: String,
    /// The gateway's hosted payment page (initiation form target).
    pub payment_endpoint: String,
    /// The gateway's transaction API (status query / cancellation).
    pub transaction_endpoint: String,
    pub channels: ChannelFlags,
}

impl Default for IpayConfig {
    fn default() -> Self {
        Self {
            vendor_id: String::default(),
            hash_key: Secret::default(),
            currency: ipg_common::KES_CURRENCY_CODE.to_string(),
            live_mode: false,
            callback_url: String::default(),
            return_url: String::default(),
            payment_endpoint: DEFAULT_PAYMENT_ENDPOINT.to_string(),
            transaction_endpoint: SANDBOX_TRANSACTION_ENDPOINT.to_string(),
            channels: ChannelFlags::default(),
        }
    }
}

impl IpayConfig {
    /// The `live` field value the gateway expects in signed requests.
    pub fn live_flag(&self) -> &'static str {
        if self.live_mode {
            "1"
        } else {
            "0"
        }
    }
}

/// Per-channel enable flags for the hosted payment page. Each becomes a `'1'`/`'0'` form field.
#[derive(Clone, Copy, Debug)]
pub struct ChannelFlags {
    pub mpesa: bool,
    pub bonga: bool,
    pub airtel: bool,
    pub equity: bool,
    pub mobilebanking: bool,
    pub creditcard: bool,
    pub unionpay: bool,
    pub mvisa: bool,
    pub vooma: bool,
    pub pesalink: bool,
    pub autopay: bool,
}

impl Default for ChannelFlags {
    fn default() -> Self {
        Self {
            mpesa: true,
            bonga: true,
            airtel: true,
            equity: true,
            mobilebanking: true,
            creditcard: true,
            unionpay: true,
            mvisa: true,
            vooma: true,
            pesalink: true,
            autopay: true,
        }
    }
}

impl ChannelFlags {
    pub fn as_form_fields(&self) -> [(&'static str, &'static str); 11] {
        let flag = |b: bool| if b { "1" } else { "0" };
        [
            ("mpesa", flag(self.mpesa)),
            ("bonga", flag(self.bonga)),
            ("airtel", flag(self.airtel)),
            ("equity", flag(self.equity)),
            ("mobilebanking", flag(self.mobilebanking)),
            ("creditcard", flag(self.creditcard)),
            ("unionpay", flag(self.unionpay)),
            ("mvisa", flag(self.mvisa)),
            ("vooma", flag(self.vooma)),
            ("pesalink", flag(self.pesalink)),
            ("autopay", flag(self.autopay)),
        ]
    }
}

/// What to do when the gateway reports a settled amount larger than the order total. This is an
/// explicit configuration decision; there is deliberately no `Default` impl.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverpaymentPolicy {
    /// Complete the payment and raise a `PaymentFlaggedEvent` so an operator can refund the
    /// difference.
    AcceptAndFlag,
    /// Fail the payment and leave reconciliation to manual review.
    Reject,
}
