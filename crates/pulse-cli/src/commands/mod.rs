use anyhow::Result;
use chrono::NaiveDate;
use pulse_core::models::Identity;
use pulse_core::repository::Repository;
use pulse_core::timezone::today_in;

use crate::config::Config;

pub mod add;
pub mod bulk;
pub mod delete;
pub mod edit;
pub mod history;
pub mod list;
pub mod project;
pub mod stats;
pub mod user;

/// Everything a command needs once the acting user is verified
pub struct Context<'a> {
    pub repo: &'a dyn Repository,
    pub me: &'a Identity,
    pub config: &'a Config,
}

impl Context<'_> {
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(today_in(&self.config.dashboard.timezone)?)
    }
}
