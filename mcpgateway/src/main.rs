use mcpgateway::McpGatewayProvider;

tfplug::serve_provider!(McpGatewayProvider::new());
