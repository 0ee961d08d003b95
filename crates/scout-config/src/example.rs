/// Starter configuration for Ethereum mainnet, written by `token-scout generate-config`.
pub const EXAMPLE_CONFIG: &str = r#"# token-scout configuration
#
# SCOUT_RPC_URL, SCOUT_ACCOUNT and SCOUT_CONCURRENCY override the matching
# settings below. Values may also reference environment variables as ${NAME}.

[scanner]
concurrency = 8
chain_id = 1

[account]
implementation = "watch"
[account.config]
# address = "0x..."

[chain]
implementation = "alloy"
[chain.config]
rpc_url = "https://ethereum-rpc.publicnode.com"

[logs]
implementation = "alloy"
window_blocks = 10000
max_block_range = 2000
[logs.config]
rpc_url = "https://ethereum-rpc.publicnode.com"

[universe]
token_lists = []
heuristic = [
	"0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984", # UNI
	"0x514910771AF9Ca656af840dff83E8264EcF986CA", # LINK
	"0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2", # MKR
	"0x7D1AfA7B718fb893dB30A3aBc0Cfc608AaCfeBB0", # MATIC
	"0x0F5D2fB29fb7d3CFeE444a200298f468908cC942", # MANA
	"0x95aD61b0a150d79219dCF64E1E6Cc01f0B64C4cE", # SHIB
	"0x6B3595068778DD592e39A122f4f5a5cF09C90fE2", # SUSHI
	"0x0bc529c00C6401aEF6D220BE8c6E16616668bD1C", # YFI
]
lp = [
	"0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc", # Uniswap V2 USDC/WETH
	"0xA478c2975Ab1Ea89e8196811F51A7B7Ade33eB11", # Uniswap V2 DAI/WETH
	"0x0d4a11d5EEaaC28EC3F61d100daF4d40471f1852", # Uniswap V2 WETH/USDT
]

[[universe.curated]]
address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
name = "USD Coin"
symbol = "USDC"
decimals = 6
logo = "usdc.png"

[[universe.curated]]
address = "0xdAC17F958D2ee523a2206206994597C13D831ec7"
name = "Tether USD"
symbol = "USDT"
decimals = 6
logo = "usdt.png"

[[universe.curated]]
address = "0x6B175474E89094C44Da98b954EedeAC495271d0F"
name = "Dai Stablecoin"
symbol = "DAI"
decimals = 18
logo = "dai.png"

[[universe.curated]]
address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
name = "Wrapped Ether"
symbol = "WETH"
decimals = 18
logo = "weth.png"

[[universe.curated]]
address = "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"
name = "Wrapped BTC"
symbol = "WBTC"
decimals = 8
logo = "wbtc.png"

[enrichment]
enabled = true
implementation = "coingecko"
concurrency = 4
[enrichment.config]
base_url = "https://api.coingecko.com/api/v3"
platform = "ethereum"
timeout_ms = 10000
"#;
