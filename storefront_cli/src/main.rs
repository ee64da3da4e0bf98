//! 商城命令行客户端

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_core::{
    ClientConfig, Destination, FeedState, FileStorage, LoadOutcome, Navigator, Notice,
    NoticeLevel, Notifier, PromotionResult, Storefront, Theme,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "商城客户端工具", long_about = None)]
struct Cli {
    /// 服务器地址
    #[arg(
        short,
        long,
        env = "STOREFRONT_API_URL",
        default_value = storefront_core::config::DEFAULT_SERVER_URL
    )]
    server: String,

    /// 会话文件路径
    #[arg(
        long,
        env = "STOREFRONT_STATE_FILE",
        default_value = ".storefront-session.json"
    )]
    state_file: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 用户登录
    Login {
        /// 邮箱
        #[arg(short, long)]
        email: String,
        /// 密码
        #[arg(short, long)]
        password: String,
    },
    /// 用户登出
    Logout,
    /// 查看当前用户
    Whoami,
    /// 浏览商品
    Products {
        /// 加载页数
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// 查看购物车
    Cart,
    /// 加入购物车
    Add {
        /// 商品ID
        product_id: u64,
        /// 数量
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// 从购物车移除
    Remove {
        /// 购物车条目ID
        line_id: u64,
    },
    /// 修改数量（小于 1 时按 1 处理）
    SetQty {
        /// 购物车条目ID
        line_id: u64,
        /// 数量
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// 试试手气，领取优惠券
    Luck,
    /// 结算
    Checkout {
        /// 优惠码
        #[arg(short, long)]
        coupon: Option<String>,
    },
    /// 订单记录
    Orders,
    /// 查看或设置主题
    Theme {
        /// light / dark / system
        value: Option<Theme>,
    },
}

/// 把提示输出到终端
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let mark = match notice.level {
            NoticeLevel::Success => "✔",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Error => "✘",
        };
        match notice.description {
            Some(description) => println!("{} {}: {}", mark, notice.title, description),
            None => println!("{} {}", mark, notice.title),
        }
    }
}

/// 命令行没有页面可以跳转，只提示下一步操作
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, destination: Destination) {
        match destination {
            Destination::Login => println!("会话已失效，请运行 `storefront login` 重新登录"),
            Destination::External(url) => {
                println!("请在浏览器中打开以下地址完成支付:");
                println!("{}", url);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = ClientConfig::with_server_url(&cli.server);
    debug!(
        "Using server {} with session file {}",
        config.server_url,
        cli.state_file.display()
    );
    let store = Storefront::new(
        config,
        Arc::new(FileStorage::new(&cli.state_file)),
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleNavigator),
    )?;

    match cli.command {
        Commands::Login { email, password } => do_login(&store, &email, &password).await?,
        Commands::Logout => do_logout(&store).await?,
        Commands::Whoami => do_whoami(&store).await?,
        Commands::Products { pages } => do_products(&store, pages).await?,
        Commands::Cart => do_cart(&store).await?,
        Commands::Add {
            product_id,
            quantity,
        } => store.add_to_cart(product_id, quantity).await?,
        Commands::Remove { line_id } => store.remove_from_cart(line_id).await?,
        Commands::SetQty { line_id, quantity } => {
            store.update_quantity(line_id, quantity).await?
        }
        Commands::Luck => do_luck(&store).await?,
        Commands::Checkout { coupon } => do_checkout(&store, coupon.as_deref()).await?,
        Commands::Orders => do_orders(&store).await?,
        Commands::Theme { value } => do_theme(&store, value)?,
    }

    Ok(())
}

fn money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

async fn do_login(store: &Storefront, email: &str, password: &str) -> anyhow::Result<()> {
    println!("正在登录用户: {}", email);
    info!("Logging in as {}", email);
    let identity = store.login(email, password).await?;
    println!("用户ID: {}", identity.id);
    Ok(())
}

async fn do_logout(store: &Storefront) -> anyhow::Result<()> {
    if store.identity().await.is_none() {
        println!("当前未登录");
        return Ok(());
    }
    store.logout().await?;
    info!("Session cleared");
    println!("已登出");
    Ok(())
}

async fn do_whoami(store: &Storefront) -> anyhow::Result<()> {
    match store.identity().await {
        Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
        None => println!("当前未登录"),
    }
    Ok(())
}

async fn do_products(store: &Storefront, pages: u32) -> anyhow::Result<()> {
    for _ in 0..pages.max(1) {
        match store.load_more_products().await? {
            LoadOutcome::Loaded(_) => {}
            LoadOutcome::Busy => continue,
            LoadOutcome::Exhausted => break,
        }
    }

    let products = store.products().await;
    info!("Loaded {} products", products.len());
    if products.is_empty() {
        println!("暂无商品");
        return Ok(());
    }
    for product in &products {
        println!("#{:<6} {:<40} {:>10}", product.id, product.name, money(product.price));
    }
    if store.products_state().await == FeedState::Exhausted {
        println!("已经到底了");
    } else {
        println!("使用 --pages 加载更多");
    }
    Ok(())
}

async fn do_cart(store: &Storefront) -> anyhow::Result<()> {
    let Some(lines) = store.cart().await? else {
        println!("请先登录后查看购物车");
        return Ok(());
    };
    if lines.is_empty() {
        println!("购物车是空的");
        return Ok(());
    }

    for line in lines.iter() {
        println!(
            "[{}] {} x{}  {}",
            line.id,
            line.product.name,
            line.quantity,
            money(line.subtotal)
        );
    }
    if let Some(summary) = store.cart_summary().await? {
        println!("小计: {}", money(summary.subtotal));
        println!("总计: {}", money(summary.total));
    }
    Ok(())
}

async fn do_luck(store: &Storefront) -> anyhow::Result<()> {
    match store.try_luck().await? {
        PromotionResult::Awarded { code, .. } => {
            println!("优惠码: {}", code);
            println!("结算时使用: storefront checkout --coupon {}", code);
        }
        PromotionResult::NotAwarded { message } => println!("{}", message),
    }
    Ok(())
}

async fn do_checkout(store: &Storefront, coupon: Option<&str>) -> anyhow::Result<()> {
    if let Some(code) = coupon {
        store.apply_coupon(code).await;
    }
    if let Some(summary) = store.cart_summary().await? {
        if let Some(code) = &summary.coupon {
            println!("优惠码 {} 预计优惠: {}", code, money(summary.discount));
        }
        println!("应付: {}", money(summary.total));
    }

    let response = store.checkout().await?;
    info!("Checkout session created");
    if let Some(order_id) = response.order_id {
        println!("订单号: {}", order_id);
    }
    Ok(())
}

async fn do_orders(store: &Storefront) -> anyhow::Result<()> {
    let orders = store.orders().await?;
    info!("Fetched {} orders", orders.len());
    if orders.is_empty() {
        println!("暂无订单");
        return Ok(());
    }
    for order in orders.iter() {
        println!(
            "订单 #{}  {}  {}  {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.label(),
            money(order.final_amount)
        );
        for item in &order.items {
            println!(
                "    {} x{}  {}",
                item.product.name,
                item.quantity,
                money(item.price_at_purchase_time)
            );
        }
    }
    Ok(())
}

fn do_theme(store: &Storefront, value: Option<Theme>) -> anyhow::Result<()> {
    match value {
        Some(theme) => {
            store.set_theme(theme)?;
            println!("主题已设置为 {}", theme);
        }
        None => println!("当前主题: {}", store.theme()?),
    }
    Ok(())
}
