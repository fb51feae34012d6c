//! REST base URLs of the supported exchanges.

pub const KUNA_API_URL: &str = "https://api.kuna.io";

pub const EXKOIN_API_URL: &str = "https://api.exkoin.com/v1";

pub const BLOFIN_API_URL: &str = "https://openapi.blofin.com";

pub const RIPIO_API_URL: &str = "https://api.ripiotrade.co/v4";

pub const NONKYC_API_URL: &str = "https://api.nonkyc.io/api/v2";
