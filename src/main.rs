use anyhow::Result;
use tracing::error;

use pdf_extract_ai::utils::logging;
use pdf_extract_ai::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置，缺少 API Key 时直接退出
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e.into());
        }
    };

    // 初始化并运行应用
    if let Err(e) = App::initialize(config).run().await {
        error!("❌ 处理失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
