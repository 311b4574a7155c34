//! 账户信息

use super::{Mt5Api, Query};
use crate::error::Result;
use crate::types::{AccountDetails, AccountRec, AccountSummary};

impl Mt5Api {
    /// 账户资料
    pub async fn account(&self) -> Result<AccountRec> {
        self.get_json("/Account", Query::new()).await
    }

    /// 余额、净值、保证金
    pub async fn account_summary(&self) -> Result<AccountSummary> {
        self.get_json("/AccountSummary", Query::new()).await
    }

    pub async fn account_details(&self) -> Result<AccountDetails> {
        self.get_json("/AccountDetails", Query::new()).await
    }
}
