use anyhow::Context as _;
use dailydraw_core::{GameConfig, GameId, RateCache, Storage};
use dailydraw_game::{SelectionEngine, ShopEngine, TransferEngine};
use std::path::{Path, PathBuf};

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dailydraw")
}

/// Everything a command needs: the store, config and rate cache of one game
pub struct Context {
    pub storage: Storage,
    pub config: GameConfig,
    pub rates: RateCache,
    pub game_id: GameId,
}

impl Context {
    pub fn open(data_dir: &Path, game_id: GameId) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let config_path = data_dir.join("config.json");
        let config =
            GameConfig::load_or_default(&config_path).context("Failed to load config.json")?;
        if !config_path.exists() {
            // leave an editable copy of the defaults behind
            config
                .save(&config_path)
                .context("Failed to write default config.json")?;
            tracing::info!("Wrote default config to {}", config_path.display());
        }

        let storage = Storage::open(&data_dir.join("dailydraw.db"))?;
        let rates = RateCache::from_config(&config)?;

        tracing::debug!("Opened game {} in {}", game_id, data_dir.display());

        Ok(Self {
            storage,
            config,
            rates,
            game_id,
        })
    }

    pub fn transfers(&self) -> TransferEngine<'_, Storage> {
        TransferEngine::new(&self.storage, &self.rates, &self.config, self.game_id)
    }

    pub fn selection(&self) -> SelectionEngine<'_, Storage> {
        SelectionEngine::new(&self.storage, self.game_id)
    }

    pub fn shop(&self) -> ShopEngine<'_, Storage> {
        ShopEngine::new(&self.storage, &self.config, self.game_id)
    }
}
